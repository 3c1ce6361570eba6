mod history;

pub use history::EditHistory;
