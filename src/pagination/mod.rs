//! Pagination module
//!
//! Supports: page-numbered fan-out in waves, serial cursor walks
//!
//! # Overview
//!
//! A paged list is fetched by planning one unit per page and running the units
//! through a [`BatchRunner`] in waves of bounded concurrency. Each wave must
//! complete before the next starts, results are kept in page order, and a
//! short page stops the run at the end of its wave.

mod batch;
mod cursor;
mod orchestrator;
mod types;

pub use batch::BatchRunner;
pub use cursor::{CursorOf, CursorWalk, CURSOR_PARAM, LIMIT_PARAM};
pub use orchestrator::{PagedFetch, PAGE_PARAM, PAGE_SIZE_PARAM};
pub use types::{short_page, FinishSignal, Page, PageShape, PagingParams, Reducer};
