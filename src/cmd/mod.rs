/*!
Subcommand dispatch targets for the `quish` binary.

One file per subcommand, each exposing one `execute_*(args, catalog_path)`
returning `anyhow::Result<()>`; argument structs derive `clap::Args`.

  list.rs    ListArgs   + execute_list    (topics / commands)
  show.rs    ShowArgs   + execute_show    (one command's definition)
  line.rs    LineArgs   + execute_line    (synthesize only)
  run.rs     RunArgs    + execute_run     (synthesize + supervise)
  preset.rs  PresetArgs + execute_preset  (snapshot values into a new command)

Shared flag groups, catalog resolution and value coercion live in
`shared.rs`; human formatting in `format.rs`.
*/

pub mod format;
pub mod line;
pub mod list;
pub mod preset;
pub mod run;
pub mod shared;
pub mod show;
pub mod subject;

pub use line::{LineArgs, execute_line};
pub use list::{ListArgs, execute_list};
pub use preset::{PresetArgs, execute_preset};
pub use run::{RunArgs, execute_run};
pub use shared::resolve_catalog_path;
pub use show::{ShowArgs, execute_show};
