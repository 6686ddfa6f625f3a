fn main() {
    // Export the ESP-IDF sysenv (paths, chip, toolchain) to dependents.
    // Host-side test builds disable the espidf feature and need none of it.
    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
