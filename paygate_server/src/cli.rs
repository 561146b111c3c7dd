use std::{env, env::VarError};

/// There's no real CLI for the server, so just do quick 'n dirty
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        // We don't expect any CLI args, so always print the help
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets (PG_LEDGER_API_KEY, PG_BOT_TOKEN, PG_WEBHOOK_SECRET, PG_ADMIN_TOKEN) are deliberately left out
    const DISPLAY_ENVS: [&str; 21] = [
        "RUST_LOG",
        "PG_HOST",
        "PG_PORT",
        "PG_DATABASE_URL",
        "PG_ORDER_EXPIRY_MINS",
        "PG_MAX_PENDING_ORDERS",
        "PG_LOCK_TTL_SECS",
        "PG_RATE_VALID_SECS",
        "PG_LEDGER_INTERVAL_SECS",
        "PG_LEDGER_WINDOW_MINS",
        "PG_LEDGER_BACKFILL_DAYS",
        "PG_LEDGER_PAGE_SIZE",
        "PG_EXPIRY_INTERVAL_SECS",
        "PG_RECEIVING_ADDRESS",
        "PG_STABLECOIN_MASTER",
        "PG_LEDGER_API_URL",
        "PG_BOT_API_URL",
        "PG_NATIVE_TOKEN_CODE",
        "PG_CREDIT_CODE",
        "PG_STABLECOIN_CODE",
        "PG_SKIP_STARTUP_JOBS",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
