fn main() {
    vcmplugin::app::cli::run();
}
