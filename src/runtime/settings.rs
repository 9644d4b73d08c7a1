use jukebot::config;

pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("jukebot: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the bot from starting.
            eprintln!("jukebot: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
