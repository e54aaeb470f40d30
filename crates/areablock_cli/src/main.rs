//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `areablock_core` linkage.
//! - Optionally print the call-directory expansion of a policy database.
//!
//! Usage: `areablock_cli [POLICY_DB_PATH]`

use areablock_core::db::open_db;
use areablock_core::{enumerate, EngineConfig, PolicyRepository, SqlitePolicyStore};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("areablock_core ping={}", areablock_core::ping());
    println!("areablock_core version={}", areablock_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    match print_policy_summary(&db_path) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("areablock_cli error={err}");
            ExitCode::FAILURE
        }
    }
}

fn print_policy_summary(db_path: &str) -> Result<(), String> {
    let conn = open_db(db_path).map_err(|err| err.to_string())?;
    let repo = PolicyRepository::new(SqlitePolicyStore::new(&conn));
    let snapshot = repo.load_snapshot().map_err(|err| err.to_string())?;
    let plan = enumerate(&snapshot, &EngineConfig::default()).map_err(|err| err.to_string())?;

    println!(
        "policy rules={} numbers={}",
        snapshot.area_code_rules.len(),
        snapshot.blocked_numbers.len()
    );
    println!(
        "call_directory area_codes={} single_numbers={} total_entries={}",
        plan.area_codes().len(),
        plan.single_numbers().len(),
        plan.total_entries()
    );
    for &code in plan.area_codes() {
        println!("{}", area_code_line(code));
    }
    Ok(())
}

fn area_code_line(code: u16) -> String {
    format!("area_code {code:03}")
}

#[cfg(test)]
mod tests {
    use super::area_code_line;

    #[test]
    fn area_codes_keep_leading_zeros() {
        assert_eq!(area_code_line(42), "area_code 042");
        assert_eq!(area_code_line(206), "area_code 206");
    }
}
