fn main() {
    // Build-time provisioning values seed the first-boot config.
    for var in [
        "DOORWATCH_WIFI_SSID",
        "DOORWATCH_WIFI_PASSWORD",
        "DOORWATCH_BROKER_HOST",
        "DOORWATCH_BROKER_PORT",
        "DOORWATCH_BROKER_USER",
        "DOORWATCH_BROKER_KEY",
        "DOORWATCH_CLIENT_ID",
        "DOORWATCH_TOPIC_PREFIX",
    ] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
