// Macros file - tracing macros are imported within the macro definitions

/// Standardized logging macros for consistent field names and message
/// patterns across the application.

// ============================================================================
// API Operation Logging Macros
// ============================================================================

/// Log the start of an API operation with consistent fields
#[macro_export]
macro_rules! log_api_start {
    ($operation:expr, deck_id = $deck_id:expr) => {
        tracing::debug!(
            operation = $operation,
            deck_id = %$deck_id,
            "API operation started"
        );
    };
    ($operation:expr, session_id = $session_id:expr) => {
        tracing::debug!(
            operation = $operation,
            session_id = %$session_id,
            "API operation started"
        );
    };
    ($operation:expr) => {
        tracing::debug!(
            operation = $operation,
            "API operation started"
        );
    };
}

/// Log successful completion of an API operation
#[macro_export]
macro_rules! log_api_success {
    ($operation:expr, deck_id = $deck_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            deck_id = %$deck_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            session_id = %$session_id,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, count = $count:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            count = $count,
            "API operation completed: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::info!(
            operation = $operation,
            "API operation completed: {}", $msg
        );
    };
}

/// Log API operation errors with consistent structure
#[macro_export]
macro_rules! log_api_error {
    ($operation:expr, deck_id = $deck_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            deck_id = %$deck_id,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
    ($operation:expr, session_id = $session_id:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            session_id = %$session_id,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
    ($operation:expr, error = $error:expr, $msg:expr) => {
        tracing::error!(
            operation = $operation,
            error = %$error,
            "API operation failed: {}", $msg
        );
    };
}

/// Log API warnings with context
#[macro_export]
macro_rules! log_api_warn {
    ($operation:expr, session_id = $session_id:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            session_id = %$session_id,
            "API operation warning: {}", $msg
        );
    };
    ($operation:expr, $msg:expr) => {
        tracing::warn!(
            operation = $operation,
            "API operation warning: {}", $msg
        );
    };
}

// ============================================================================
// Generation Service Logging Macros
// ============================================================================

/// Log generation operations with model context
#[macro_export]
macro_rules! log_generation {
    (start, $operation:expr, model = $model:expr, quantity = $quantity:expr) => {
        tracing::info!(
            component = "generation",
            operation = $operation,
            model = %$model,
            quantity = $quantity,
            "Generation started"
        );
    };
    (success, $operation:expr, model = $model:expr, card_count = $count:expr) => {
        tracing::info!(
            component = "generation",
            operation = $operation,
            model = %$model,
            card_count = $count,
            "Generation completed successfully"
        );
    };
    (error, $operation:expr, model = $model:expr, error = $error:expr) => {
        tracing::error!(
            component = "generation",
            operation = $operation,
            model = %$model,
            error = %$error,
            "Generation failed"
        );
    };
}

// ============================================================================
// System Event Logging Macros
// ============================================================================

/// Log system startup and shutdown events
#[macro_export]
macro_rules! log_system_event {
    (startup, component = $component:expr, $msg:expr) => {
        tracing::info!(
            event_type = "startup",
            component = $component,
            "System event: {}",
            $msg
        );
    };
    (config, $msg:expr) => {
        tracing::info!(event_type = "configuration", "System event: {}", $msg);
    };
}

// ============================================================================
// Validation Logging Macros
// ============================================================================

/// Log validation results consistently
#[macro_export]
macro_rules! log_validation {
    (success, $component:expr, $msg:expr) => {
        tracing::debug!(
            event_type = "validation",
            component = $component,
            result = "success",
            "Validation completed: {}", $msg
        );
    };
    (failure, $component:expr, error = $error:expr) => {
        tracing::warn!(
            event_type = "validation",
            component = $component,
            result = "failure",
            error = %$error,
            "Validation failed"
        );
    };
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    #[test]
    fn test_logging_macros_compile() {
        let deck_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let error = anyhow::anyhow!("test error");

        log_api_start!("generate_deck", deck_id = deck_id);
        log_api_start!("request_more", session_id = session_id);
        log_api_start!("list_decks");

        log_api_success!("generate_deck", deck_id = deck_id, "deck created");
        log_api_success!("list_decks", count = 3, "decks listed");

        log_api_error!("request_more", session_id = session_id, error = error, "generation failed");
        log_api_warn!("request_more", session_id = session_id, "request already in flight");

        log_generation!(start, "generate", model = "test-model", quantity = 5);
        log_generation!(success, "generate", model = "test-model", card_count = 5);

        log_system_event!(startup, component = "server", "server starting");
        log_system_event!(config, "configuration loaded successfully");

        log_validation!(success, "generate_request", "request validated");
    }
}
