fn main() -> anyhow::Result<()> {
    monitor_app::run_app()
}
