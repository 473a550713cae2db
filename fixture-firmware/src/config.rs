// Projekt-Konfiguration: Konstanten und Hardware-Zuordnungen

// ============================================================================
// PWM Konfiguration (LEDC)
// ============================================================================

/// GPIO-Pin für den roten Kanal
pub const RED_GPIO_PIN: u8 = 19;

/// GPIO-Pin für den grünen Kanal
pub const GREEN_GPIO_PIN: u8 = 18;

/// GPIO-Pin für den blauen Kanal
pub const BLUE_GPIO_PIN: u8 = 5;

/// PWM-Frequenz in kHz
/// 24 kHz liegt über dem hörbaren Bereich und flackert nicht
pub const PWM_FREQUENCY_KHZ: u32 = 24;

// ============================================================================
// Flash Konfiguration
// ============================================================================

/// Offset der zwei Sektoren (Slot A/B) für den Leuchten-Zustand
///
/// Liegen direkt hinter der Factory-App der Standard-Partitionstabelle
/// (0x10000 + 0x3F0000) im 8 MB Flash und belegen 0x40_0000..0x40_2000.
pub const STATE_FLASH_OFFSET: u32 = 0x40_0000;

// ============================================================================
// WiFi Konfiguration
// ============================================================================

/// WiFi SSID (Netzwerk-Name)
/// Wird zur Build-Zeit aus der Environment Variable WIFI_SSID geladen
/// Setze diese in .env file (siehe .env.example)
pub const WIFI_SSID: &str = env!(
    "WIFI_SSID",
    "WiFi SSID nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// WiFi Passwort
/// Wird zur Build-Zeit aus der Environment Variable WIFI_PASSWORD geladen
pub const WIFI_PASSWORD: &str = env!(
    "WIFI_PASSWORD",
    "WiFi Password nicht gesetzt! Erstelle .env file (siehe .env.example)"
);

/// Wartezeit nach Verbindungsfehler in Sekunden
pub const WIFI_RETRY_DELAY_SECS: u64 = 5;

/// Heap-Größe für WiFi (Bytes)
/// WiFi benötigt dynamischen Speicher für Pakete
pub const WIFI_HEAP_SIZE: usize = 65536; // 64 KB

/// Zusätzliche Heap-Größe (Bytes)
pub const EXTRA_HEAP_SIZE: usize = 36864; // 36 KB

// ============================================================================
// HTTP Server Konfiguration
// ============================================================================

/// TCP Port des HTTP-Servers
pub const HTTP_PORT: u16 = 80;

/// Anzahl paralleler HTTP Server Tasks (eine Connection pro Task)
/// Muss zu `pool_size` in `http_server_task` passen
pub const HTTP_TASK_COUNT: usize = 4;

/// HTTP Buffer-Größe in Bytes
/// Für HTTP Request/Response Headers und Body
pub const HTTP_BUFFER_SIZE: usize = 1024;

/// TCP RX Buffer-Größe in Bytes
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP TX Buffer-Größe in Bytes
pub const TCP_TX_BUFFER_SIZE: usize = 1024;

/// JSON Serialisierungs-Buffer für API-Antworten
/// Für {"error":"hardware_unavailable","message":"..."} reicht das locker
pub const JSON_RESPONSE_BUFFER_SIZE: usize = 192;
