use shadow_rs::ShadowBuilder;

fn main() {
    // Build metadata behind `diskcache-compat --version`
    ShadowBuilder::builder()
        .build()
        .expect("Failed to generate build metadata");
}
