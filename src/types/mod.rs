pub mod border;
pub mod list;
pub mod skiplist;
pub mod sorted_set;

pub use border::ScoreBorder;
pub use list::List;
pub use skiplist::Element;
pub use sorted_set::SortedSet;
