//! Recovery-key command - display the transcription form of the master key

use anyhow::Result;
use colored::Colorize;

use noteport::core::AppPaths;
use noteport::snapshot::KeyManager;

pub fn run(paths: &AppPaths) -> Result<()> {
    let keys = KeyManager::new(&paths.secrets);
    let recovery = keys.recovery_key()?;

    println!("{}", "Recovery Key".bold());
    println!();
    println!("  {}", recovery.cyan().bold());
    println!();
    println!(
        "{} Write this down and store it offline. It is the only way to",
        "!".yellow()
    );
    println!("  decrypt your snapshots if this device is lost.");

    Ok(())
}
