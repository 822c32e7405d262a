use std::{env, env::VarError};

/// The server takes no arguments. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
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
    // Be explicit about which envars to print, so as to avoid accidentally exposing secrets
    const DISPLAY_ENVS: [&str; 12] = [
        "RUST_LOG",
        "DBK_HOST",
        "DBK_PORT",
        "DBK_DATABASE_URL",
        "DBK_MAX_DB_CONNECTIONS",
        "DBK_SECURE_COOKIES",
        "DBK_SEED_CATALOG",
        "DBK_ADMIN_EMAILS",
        "DBK_MIDTRANS_PRODUCTION",
        "DBK_MIDTRANS_API_URL",
        "DBK_MIDTRANS_SIGNATURE_CHECKS",
        "DBK_MIDTRANS_TIMEOUT_SECS",
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
