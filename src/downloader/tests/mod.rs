use super::test_helpers::*;
use super::*;
use crate::error::Error;
use crate::format::FormatSelector;
use crate::progress::{Percentage, ProgressEvent};
use crate::types::{Event, JobState};
use futures::StreamExt;
use std::time::Duration;

/// Progress event for a figure printed as `text`
fn percent(text: &str) -> ProgressEvent {
    ProgressEvent::Percent(Percentage::parse(text).unwrap())
}

mod files;
mod lifecycle;
