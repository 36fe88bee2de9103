pub mod records;
pub mod root;

// Re-export handler functions for use in routing
pub use records::{create as record_create, destroy as record_destroy, list as record_list,
    show as record_show, update as record_update};
pub use root::{health, index};
