use std::env;
use std::path::PathBuf;

// Runs before the logger exists, so report on stderr
pub fn load_dotenv() {
    if dotenv::dotenv().is_ok() {
        eprintln!("Loaded local .env")
    }
    // Also load ~/.config/landroid/.env if it exists
    if let Ok(home) = env::var("HOME") {
        let user_dotenv: PathBuf = [home.as_str(), ".config", "landroid", ".env"]
            .iter()
            .collect();
        if dotenv::from_path(&user_dotenv).is_ok() {
            eprintln!("Loaded {}", user_dotenv.display());
        }
    }
}
