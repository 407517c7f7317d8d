//! Binary entry point. Everything interesting lives in the library; this
//! file only brings up persistence and hands control to the event loop.
use clinic_note_manager::{
    database_path, ensure_schema, fetch_abbreviations, run_app, seed_reference_data, App,
    SearchWorker,
};

/// Open the database, seed the reference catalogs on first run, and drive
/// the terminal UI until the user quits.
///
/// Fatal startup problems (an unwritable home directory, a corrupt database
/// file) surface on stderr through the returned `Result`.
fn main() -> anyhow::Result<()> {
    let conn = ensure_schema()?;
    seed_reference_data(&conn)?;
    let abbreviations = fetch_abbreviations(&conn)?;

    // The catalog searches run on their own connection so long queries never
    // stall the draw loop.
    let search = SearchWorker::spawn(database_path()?)?;

    let mut app = App::new(conn, search, abbreviations);
    run_app(&mut app)
}
