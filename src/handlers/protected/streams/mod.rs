// handlers/protected/streams/mod.rs - /streams endpoints

pub mod create;
pub mod delete;
pub mod list;
pub mod members;
pub mod show;
pub mod update;

pub use create::stream_create;
pub use delete::stream_delete;
pub use list::stream_list;
pub use members::stream_members_update;
pub use show::stream_show;
pub use update::stream_update;

use serde::Deserialize;

/// Body of stream create and rename requests
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StreamName {
    pub name: String,
}
