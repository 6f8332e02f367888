//! Scraping engine for browse.
//!
//! Every function takes a borrowed [`PageHandle`](browse_relay::PageHandle)
//! for a tab of the user's logged-in browser and returns a serializable
//! record or a [`ScrapeError`].
//!
//! - [`generic`]: page text, links, images, scoped HTML, user scripts,
//!   navigation and screenshots for arbitrary pages.
//! - [`pagination`]: scroll-driven collection with de-duplication.
//! - [`sites`]: X/Twitter, LinkedIn, Reddit and Instagram.
//! - [`parse`]: count, date and text helpers shared by the sites.
//!
//! All in-page work runs as tagged scripts through `Runtime.evaluate`;
//! site markup knowledge stays inside each site's script table.

pub mod error;
pub mod generic;
mod options;
pub mod pagination;
pub mod parse;
mod script;
pub mod sites;

pub use error::{ErrorKind, ScrapeError};
pub use options::ScrapeOptions;
pub use pagination::{Collection, Collector, DedupSet, ScrollMode, ScrollPolicy};
