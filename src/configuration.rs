use secrecy::Secret;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Debug, Deserialize, Clone)]
pub struct Settings {
    pub dashscope: DashScopeSettings,
}

/// Settings for the DashScope provider, which serves both the embedding
/// endpoint and the asynchronous text-to-image endpoint.
#[derive(Debug, Deserialize, Clone)]
pub struct DashScopeSettings {
    pub api_key: Secret<String>,
    pub base_url: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub request_timeout_seconds: u64,
    pub embedding: EmbeddingModelSettings,
    pub image: ImageModelSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct EmbeddingModelSettings {
    pub model: String,
    /// Dimension of the vectors returned by the embedding model.
    /// A response with any other dimension is rejected.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub dimension: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ImageModelSettings {
    pub model: String,
    /// Size of the generated images, in the provider's `width*height` format
    pub size: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub count: u32,
}

impl DashScopeSettings {
    /// OpenAI-compatible embeddings endpoint
    pub fn embeddings_url(&self) -> String {
        format!("{}/compatible-mode/v1/embeddings", self.base_url)
    }

    /// Asynchronous text-to-image submission endpoint
    pub fn image_synthesis_url(&self) -> String {
        format!(
            "{}/api/v1/services/aigc/text2image/image-synthesis",
            self.base_url
        )
    }

    /// Status endpoint for an asynchronous task
    pub fn task_url(&self, task_id: &str) -> String {
        format!("{}/api/v1/tasks/{}", self.base_url, task_id)
    }
}

/// Extracts app settings from configuration files and env variables
///
/// `base.yaml` should contain shared settings for all environments.
/// A specific env file should be created for each environment: `develop.yaml`, `local.yaml` and `production.yaml`
/// The environment is set with the env var `APP_ENVIRONMENT`.
/// If `APP_ENVIRONMENT` is not set, `develop.yaml` is the default.
///
/// Settings are also taken from environment variables: with a prefix of APP and '__' as separator
/// For ex: `APP_DASHSCOPE__API_KEY=xxx` would set `Settings.dashscope.api_key`
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    // Detects the running environment.
    // Default to `develop` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "develop".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // Adds in settings from environment variables (with a prefix of APP and '__' as separator)
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
pub enum Environment {
    Develop,
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Develop => "develop",
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "develop" => Ok(Self::Develop),
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. Use either `develop`, `local` or `production`.",
                other
            )),
        }
    }
}
