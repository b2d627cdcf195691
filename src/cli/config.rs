use crate::config::generate::generate_starter_config;
use std::fs;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    let Some(home_dir) = dirs::home_dir() else {
        return Err("could not determine home directory; use --stdout instead".into());
    };

    let config_path = home_dir.join(".config/tarspool/config.yml");
    if config_path.exists() {
        return Err(format!(
            "config already exists at {}; remove it first or use --stdout",
            config_path.display()
        )
        .into());
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(&config_path, config_content)?;
    println!("Wrote starter config to {}", config_path.display());

    Ok(())
}
