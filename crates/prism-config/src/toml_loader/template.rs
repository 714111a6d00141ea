//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Prism Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[gemini]
# api_key_env = "API_KEY"        # environment variable holding the key
# model = "gemini-2.5-flash-preview-04-17"
# image_model = "imagen-3.0-generate-002"
# max_output_tokens = 8192       # 1-65536
# temperature = 1.0              # 0.0-2.0
# connect_timeout_secs = 10      # 1-120
# request_timeout_secs = 300     # 1-3600

[chat]
# system_instruction = ""

[media]
# max_file_size_mb = 10          # 1-2048
# video_warning_size_mb = 50     # 1-2048
# allowed_image_types = ["image/jpeg", "image/png", "image/webp", "image/gif"]
# allowed_video_types = ["video/mp4", "video/mpeg", "video/webm", "video/quicktime",
#                        "video/x-msvideo", "video/x-flv", "video/3gpp", "video/x-matroska"]

[images]
# default_count = 1              # 1-max_count
# max_count = 4                  # 1-4

[logging]
# level = "INFO"                 # DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
