fn main() {
    kitzur_cli::run_main();
}
