fn main() -> anyhow::Result<()> {
    pomodo_lib::run()
}
