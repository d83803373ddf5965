//! Health and configuration summary.

use super::App;
use console::style;

impl App {
    pub async fn status(&self, config_path: &str) -> String {
        let mut out = String::new();
        out.push_str(&format!("{}\n\n", style("Tally — Status").bold()));
        out.push_str(&format!("Config: {config_path}\n"));
        out.push_str(&format!("Store: {}\n", self.config.store.db_path));
        out.push_str(&format!("Tasks key: {}\n", self.config.store.tasks_key));

        match self.repository.list().await {
            Ok(tasks) => {
                let open = tasks.iter().filter(|t| !t.completed).count();
                out.push_str(&format!("Tasks: {} ({open} open)\n", tasks.len()));
            }
            Err(e) => out.push_str(&format!("Tasks: unavailable ({e})\n")),
        }

        out.push_str(&format!(
            "Remote: {} ({})\n",
            if self.config.remote.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.config.remote.base_url
        ));
        out.push_str(&format!(
            "Reminders: {} (lead {} min)",
            if self.config.reminder.enabled {
                "enabled"
            } else {
                "disabled"
            },
            self.config.reminder.lead_minutes
        ));
        out
    }
}
