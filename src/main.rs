use aviary::ViewerConfig;

fn main() -> anyhow::Result<()> {
    aviary::run(ViewerConfig::default())
}
