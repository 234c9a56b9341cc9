fn main() {
    println!("cargo:rerun-if-changed=config/schema.txt");
    println!("cargo:rerun-if-changed=config/scoreboard.cfg");

    // ESP-IDF link arguments are only needed for the firmware binary.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
