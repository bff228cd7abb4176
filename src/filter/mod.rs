pub mod date_window;
pub mod error;
pub mod history;
pub mod search;

pub use date_window::DateWindow;
pub use error::FilterError;
pub use history::HistoryFilter;
pub use search::ContactSearch;
