use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

/// 程序配置
#[derive(Clone, Debug)]
pub struct Config {
    /// 监听地址
    pub bind_addr: String,
    // --- 数据存储配置 ---
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub questions_table: String,
    pub attempts_table: String,
    pub performance_table: String,
    /// 外部调用超时（秒）
    pub request_timeout_secs: u64,
    // --- 题量上限 ---
    pub quicktest_limit: usize,
    pub revision_limit: usize,
    // --- 缓存配置 ---
    pub cache_capacity: u64,
    pub cache_ttl_secs: u64,
    /// 允许的跨域来源，`*` 表示全部
    pub cors_origins: Vec<String>,
    // --- LLM 配置 ---
    pub llm_api_key: Option<String>,
    pub llm_api_base_url: String,
    pub llm_model_name: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            supabase_url: String::new(),
            supabase_service_role_key: String::new(),
            questions_table: "questions".to_string(),
            attempts_table: "attempts".to_string(),
            performance_table: "performance".to_string(),
            request_timeout_secs: 20,
            quicktest_limit: 60,
            revision_limit: 120,
            cache_capacity: 256,
            cache_ttl_secs: 300,
            cors_origins: vec!["*".to_string()],
            llm_api_key: None,
            llm_api_base_url: "https://api.deepseek.com/v1".to_string(),
            llm_model_name: "deepseek-reasoner".to_string(),
        }
    }
}

impl Config {
    /// 从环境变量（及 `.env` 文件）加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// 从任意键值来源加载配置
    ///
    /// `SUPABASE_URL` 与 `SUPABASE_SERVICE_ROLE_KEY` 必须存在，其余均有默认值。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let default = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Self {
            bind_addr: get("BIND_ADDR").unwrap_or(default.bind_addr),
            supabase_url: required(&get, "SUPABASE_URL")?,
            supabase_service_role_key: required(&get, "SUPABASE_SERVICE_ROLE_KEY")?,
            questions_table: get("QUESTIONS_TABLE").unwrap_or(default.questions_table),
            attempts_table: get("ATTEMPTS_TABLE").unwrap_or(default.attempts_table),
            performance_table: get("PERFORMANCE_TABLE").unwrap_or(default.performance_table),
            request_timeout_secs: parsed(&get, "REQUEST_TIMEOUT_SECS", default.request_timeout_secs)?,
            quicktest_limit: positive(&get, "QUICKTEST_LIMIT", default.quicktest_limit)?,
            revision_limit: positive(&get, "REVISION_LIMIT", default.revision_limit)?,
            cache_capacity: parsed(&get, "CACHE_CAPACITY", default.cache_capacity)?,
            cache_ttl_secs: parsed(&get, "CACHE_TTL_SECS", default.cache_ttl_secs)?,
            cors_origins: get("CORS_ORIGINS")
                .map(|v| {
                    v.split(',')
                        .map(|origin| origin.trim().to_string())
                        .filter(|origin| !origin.is_empty())
                        .collect()
                })
                .unwrap_or(default.cors_origins),
            llm_api_key: get("LLM_API_KEY").or_else(|| get("DEEPSEEK_API_KEY")),
            llm_api_base_url: get("LLM_API_BASE_URL").unwrap_or(default.llm_api_base_url),
            llm_model_name: get("LLM_MODEL_NAME").unwrap_or(default.llm_model_name),
        })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

fn required<G>(get: &G, var_name: &str) -> Result<String, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    get(var_name).ok_or_else(|| ConfigError::EnvVarNotFound {
        var_name: var_name.to_string(),
    })
}

fn parsed<G, T>(get: &G, var_name: &str, default: T) -> Result<T, ConfigError>
where
    G: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match get(var_name) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: std::any::type_name::<T>().to_string(),
            }),
    }
}

/// 题量上限至少为 1
fn positive<G>(get: &G, var_name: &str, default: usize) -> Result<usize, ConfigError>
where
    G: Fn(&str) -> Option<String>,
{
    let value = parsed(get, var_name, default)?;
    if value == 0 {
        return Err(ConfigError::EnvVarParseFailed {
            var_name: var_name.to_string(),
            value: value.to_string(),
            expected_type: "正整数".to_string(),
        });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_applied() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
        ]))
        .unwrap();

        assert_eq!(config.quicktest_limit, 60);
        assert_eq!(config.revision_limit, 120);
        assert_eq!(config.questions_table, "questions");
        assert_eq!(config.cors_origins, vec!["*".to_string()]);
        assert!(config.llm_api_key.is_none());
    }

    #[test]
    fn test_missing_supabase_url() {
        let err = Config::from_lookup(lookup(&[("SUPABASE_SERVICE_ROLE_KEY", "secret")])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarNotFound { var_name } if var_name == "SUPABASE_URL"));
    }

    #[test]
    fn test_bad_number_is_reported() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
            ("QUICKTEST_LIMIT", "sixty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { var_name, .. } if var_name == "QUICKTEST_LIMIT"));
    }

    #[test]
    fn test_deepseek_key_alias_and_origins() {
        let config = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
            ("DEEPSEEK_API_KEY", "sk-test"),
            ("CORS_ORIGINS", "https://a.example, https://b.example,"),
        ]))
        .unwrap();
        assert_eq!(config.llm_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.cors_origins.len(), 2);
    }

    #[test]
    fn test_zero_limit_rejected() {
        let err = Config::from_lookup(lookup(&[
            ("SUPABASE_URL", "https://demo.supabase.co"),
            ("SUPABASE_SERVICE_ROLE_KEY", "secret"),
            ("REVISION_LIMIT", "0"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::EnvVarParseFailed { var_name, .. } if var_name == "REVISION_LIMIT"));
    }
}
