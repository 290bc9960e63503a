//! The extraction engine for the search results page.
//!
//! Everything here talks to the page only through
//! [`crate::driver::PageDriver`], so the same code runs against Chromium and
//! against the offline HTML fixtures used in tests.
//!
//! # Components
//!
//! | Component | Module | Role |
//! |-----------|--------|------|
//! | Locators | [`locators`] | Selectors and fixed strings of the site |
//! | Obstruction wrapper | [`obstruction`] | Dismiss overlays, retry an action once |
//! | Category reconciler | [`categories`] | Catalog read, name resolution, checkbox toggles |
//! | Record extractor | [`extract`] | One result item to one [`crate::models::ArticleRecord`] |
//! | Boundary detector | [`boundary`] | Month-granularity window checks and page trimming |
//! | Controller | [`controller`] | The run itself: sort, filter, paginate |
//!
//! # Failure Handling
//!
//! Field-level failures get defaults, page-level failures end the run with
//! the records gathered so far. Only a failed sort or an empty first page
//! abort it.

pub mod boundary;
pub mod categories;
pub mod controller;
pub mod extract;
pub mod locators;
pub mod obstruction;
