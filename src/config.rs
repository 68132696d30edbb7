use anyhow::Result;
use serde::{Deserialize, Serialize};
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::spamguard::GuildLimits;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Settings {
    pub env: String,
    pub app: App,
    pub discord: Discord,
    pub logging: Logging,
    pub spamguard: SpamGuardConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct App {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Discord {
    pub token: String,
    pub app_id: Option<String>,
    pub intents: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Logging {
    pub json: Option<bool>,
    pub level: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct SpamGuardConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub flood_enabled: bool,
    /// Maks. liczba wiadomości na minutę.
    #[serde(default = "default_max_flood")]
    pub max_flood_count: usize,
    #[serde(default = "default_true")]
    pub similar_enabled: bool,
    /// Maks. liczba podobnych wiadomości na minutę.
    #[serde(default = "default_max_similar")]
    pub max_similar_count: usize,
    /// Kanał logów usunięć; brak => audyt wyłączony.
    pub audit_channel_id: Option<u64>,
    #[serde(default = "default_true")]
    pub ignore_bots: bool,
    #[serde(default)]
    pub guilds: Vec<GuildOverride>,
}

/// `[[spamguard.guilds]]` w TOML. Brak pola => wartość globalna.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GuildOverride {
    pub guild_id: u64,
    pub flood_enabled: Option<bool>,
    pub max_flood_count: Option<usize>,
    pub similar_enabled: Option<bool>,
    pub max_similar_count: Option<usize>,
    #[serde(default)]
    pub disabled: bool,
}

fn default_true() -> bool {
    true
}

fn default_max_flood() -> usize {
    10
}

fn default_max_similar() -> usize {
    3
}

impl Default for SpamGuardConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            flood_enabled: true,
            max_flood_count: default_max_flood(),
            similar_enabled: true,
            max_similar_count: default_max_similar(),
            audit_channel_id: None,
            ignore_bots: true,
            guilds: vec![],
        }
    }
}

impl SpamGuardConfig {
    /// Progi dla gildii: nadpisanie (jeśli jest) ma pierwszeństwo nad domyślnymi.
    /// `None` gdy SpamGuard jest dla tej gildii wyłączony,
    /// `None` w polu => ten check nie jest uruchamiany.
    pub fn limits_for(&self, guild_id: u64) -> Option<GuildLimits> {
        if !self.enabled {
            return None;
        }
        let o = self.guilds.iter().find(|g| g.guild_id == guild_id);
        if o.is_some_and(|o| o.disabled) {
            return None;
        }

        let flood_on = o.and_then(|o| o.flood_enabled).unwrap_or(self.flood_enabled);
        let similar_on = o.and_then(|o| o.similar_enabled).unwrap_or(self.similar_enabled);
        let flood_max = o.and_then(|o| o.max_flood_count).unwrap_or(self.max_flood_count);
        let similar_max = o
            .and_then(|o| o.max_similar_count)
            .unwrap_or(self.max_similar_count);

        Some(GuildLimits {
            max_flood_count: flood_on.then_some(flood_max),
            max_similar_count: similar_on.then_some(similar_max),
        })
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        // Które środowisko?
        let env = std::env::var("TSG_ENV").unwrap_or_else(|_| "development".to_string());

        // Załaduj .env.<env> i .env (jeśli są)
        let _ = dotenvy::from_filename(format!(".env.{}", env));
        let _ = dotenvy::dotenv();

        Self::from_figment(Self::figment(&env), env)
    }

    /// Warstwy: domyślne -> plik TOML -> zmienne środowiskowe TSG_*
    fn figment(env: &str) -> Figment {
        Figment::from(Serialized::defaults(Self::defaults(env)))
            .merge(Toml::file(format!("config/{}.toml", env)))
            // TSG_DISCORD__TOKEN => discord.token, TSG_SPAMGUARD__FLOOD_ENABLED => spamguard.flood_enabled
            .merge(Env::prefixed("TSG_").split("__"))
    }

    fn from_figment(figment: Figment, env: String) -> Result<Self> {
        let mut s: Settings = figment.extract()?;
        s.env = env;
        Ok(s)
    }

    fn defaults(env: &str) -> Settings {
        Settings {
            env: env.to_string(),
            app: App {
                name: "Tigris SpamGuard".into(),
            },
            discord: Discord {
                token: "".into(),
                app_id: None,
                intents: vec![
                    "GUILDS".into(),
                    "GUILD_MESSAGES".into(),
                    "MESSAGE_CONTENT".into(),
                ],
            },
            logging: Logging {
                json: Some(false),
                level: Some("info".into()),
            },
            spamguard: SpamGuardConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn guild_override_beats_defaults() {
        let cfg = SpamGuardConfig {
            guilds: vec![
                GuildOverride {
                    guild_id: 1,
                    max_flood_count: Some(4),
                    ..Default::default()
                },
                GuildOverride {
                    guild_id: 2,
                    disabled: true,
                    ..Default::default()
                },
            ],
            ..Default::default()
        };

        assert_eq!(
            cfg.limits_for(1),
            Some(GuildLimits {
                max_flood_count: Some(4),
                max_similar_count: Some(3),
            })
        );
        assert_eq!(cfg.limits_for(2), None);
        assert_eq!(cfg.limits_for(3).and_then(|l| l.max_flood_count), Some(10));
    }

    #[test]
    fn master_switch_disables_every_guild() {
        let cfg = SpamGuardConfig {
            enabled: false,
            ..Default::default()
        };
        assert_eq!(cfg.limits_for(1), None);
    }

    #[test]
    fn toml_and_env_layers_are_merged() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all("config").map_err(|e| e.to_string())?;
            jail.create_file(
                "config/test.toml",
                r#"
                [spamguard]
                max_similar_count = 5
                audit_channel_id = 555

                [[spamguard.guilds]]
                guild_id = 42
                max_flood_count = 2
                "#,
            )?;
            jail.set_env("TSG_DISCORD__TOKEN", "abc");
            jail.set_env("TSG_SPAMGUARD__MAX_FLOOD_COUNT", "7");

            let s = Settings::from_figment(Settings::figment("test"), "test".into())
                .map_err(|e| e.to_string())?;
            assert_eq!(s.discord.token, "abc");
            assert_eq!(s.spamguard.max_flood_count, 7);
            assert_eq!(s.spamguard.max_similar_count, 5);
            assert_eq!(s.spamguard.audit_channel_id, Some(555));
            assert_eq!(
                s.spamguard.limits_for(42).and_then(|l| l.max_flood_count),
                Some(2)
            );
            Ok(())
        });
    }
    #[test]
    fn single_check_can_be_switched_off_per_guild() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all("config").map_err(|e| e.to_string())?;
            jail.create_file(
                "config/test.toml",
                r#"
                [[spamguard.guilds]]
                guild_id = 1
                flood_enabled = false

                [[spamguard.guilds]]
                guild_id = 2
                "#,
            )?;

            let s = Settings::from_figment(Settings::figment("test"), "test".into())
                .map_err(|e| e.to_string())?;
            assert_eq!(
                s.spamguard.limits_for(1),
                Some(GuildLimits {
                    max_flood_count: None,
                    max_similar_count: Some(3),
                })
            );
            // nadpisanie bez pól => wartości globalne
            assert_eq!(
                s.spamguard.limits_for(2),
                Some(GuildLimits {
                    max_flood_count: Some(10),
                    max_similar_count: Some(3),
                })
            );
            Ok(())
        });
    }

    #[test]
    fn global_switch_disables_check_and_guild_can_reenable_it() {
        Jail::expect_with(|jail| {
            std::fs::create_dir_all("config").map_err(|e| e.to_string())?;
            jail.create_file(
                "config/test.toml",
                r#"
                [[spamguard.guilds]]
                guild_id = 9
                similar_enabled = true
                max_similar_count = 6
                "#,
            )?;
            jail.set_env("TSG_SPAMGUARD__SIMILAR_ENABLED", "false");

            let s = Settings::from_figment(Settings::figment("test"), "test".into())
                .map_err(|e| e.to_string())?;
            assert_eq!(s.spamguard.limits_for(3).and_then(|l| l.max_similar_count), None);
            assert_eq!(s.spamguard.limits_for(9).and_then(|l| l.max_similar_count), Some(6));
            assert_eq!(s.spamguard.limits_for(3).and_then(|l| l.max_flood_count), Some(10));
            Ok(())
        });
    }
}
