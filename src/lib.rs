pub mod backgammon;

use backgammon::{
    ReadXgCubeVTab, ReadXgVTab, XgidDecisionTypeScalar, XgidIsStartingPositionScalar,
};
use duckdb::{Connection, Result};
use duckdb_ext_macros::duckdb_extension;
use std::error::Error;

#[duckdb_extension(name = "duckdb_backgammon", api_version = "v1.0.0")]
pub unsafe fn extension_entrypoint(con: Connection) -> Result<(), Box<dyn Error>> {
    // Table functions
    con.register_table_function::<ReadXgVTab>("read_xg")?;
    con.register_table_function::<ReadXgCubeVTab>("read_xg_cube")?;

    // Scalar functions
    con.register_scalar_function::<XgidDecisionTypeScalar>("xgid_decision_type")?;
    con.register_scalar_function::<XgidIsStartingPositionScalar>("xgid_is_starting_position")?;

    Ok(())
}
