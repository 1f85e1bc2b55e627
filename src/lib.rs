#![forbid(unsafe_code)]

pub mod error;
pub mod extract;
pub mod model;
pub mod palette;
pub mod splice;
pub mod weave;

pub use error::{TapestryError, TapestryResult};
pub use extract::{archive_date, build_slice, run_extract, write_slice};
pub use model::{DailySlice, LanguageCounts, SliceMetrics, TopRepoEntry, TrendingPayload};
pub use splice::{render_digest, run_splice, splice_into, SPLICE_END, SPLICE_START};
pub use weave::{escape_xml, latest_slice, load_slices, run_weave, weave_tapestry, WeaveConfig};
