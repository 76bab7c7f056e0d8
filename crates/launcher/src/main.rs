fn main() -> anyhow::Result<()> {
    launcher::native::run()
}
