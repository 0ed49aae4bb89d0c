use crate::config::ProtocolConfig;

pub fn validate_lobby_id_with_config(
    lobby_id: &str,
    config: &ProtocolConfig,
) -> Result<(), String> {
    if lobby_id.is_empty() {
        return Err("Lobby id cannot be empty".to_string());
    }
    if lobby_id.chars().count() > config.max_lobby_id_length {
        return Err(format!(
            "Lobby id too long (max {} characters)",
            config.max_lobby_id_length
        ));
    }
    if !lobby_id
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err("Lobby id contains invalid characters".to_string());
    }
    Ok(())
}

pub fn validate_username_with_config(
    username: &str,
    config: &ProtocolConfig,
) -> Result<(), String> {
    if username.trim().is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.chars().count() > config.max_username_length {
        return Err(format!(
            "Username too long (max {} characters)",
            config.max_username_length
        ));
    }
    if username.chars().any(char::is_control) {
        return Err("Username cannot contain control characters".to_string());
    }
    Ok(())
}
