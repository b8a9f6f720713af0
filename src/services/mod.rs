pub mod answer_store;
pub mod autosave;
pub mod loader;
pub mod matching;
pub mod session;
pub mod shuffle;
pub mod timer;
