//! Metadata index wrapping Fjall.
//!
//! [`MetaBase`] keeps two keyspaces:
//!
//! - `index` — `<container>/<tag><object>` keys, one contiguous range per
//!   container partition (primary, tombstone, storage-group)
//! - `graveyard` — `<container>/<object>` → one-byte marker; any positive
//!   marker hides the address from listings
//!
//! Listing is paginated with an opaque [`Cursor`] and walks containers in
//! key order, see [`MetaBase::list_with_cursor`].

mod cursor;
mod error;
mod keys;
mod list;
mod store;

pub use cursor::Cursor;
pub use error::{CursorError, MetaError};
pub use list::ListPage;
pub use store::{GraveMark, MetaBase};
