//! Property tests: patching is idempotent and never drops existing text.

use proptest::prelude::*;
use zdev::vite::{patch_source, PatchOptions};

/// Config shapes the patcher recognizes, plus ones it deliberately leaves alone.
const SHAPES: &[&str] = &[
    "export default defineConfig({ plugins: [] })",
    "export default defineConfig({\n  plugins: [react()],\n  resolve: { alias: {} },\n})",
    "const config = defineConfig({\n  plugins: [\n    viteReact(),\n  ],\n})\n\nexport default config",
    "export default {\n  plugins: [],\n}",
    "export default defineConfig({\n  server: {\n    port: 3000,\n    host: \"0.0.0.0\",\n  },\n})",
    "export default defineConfig({\n  server: { allowedHosts: true },\n})",
    "export default defineConfig({\n  server: {\n    hmr: { port: 24678 },\n  },\n})",
    "export default defineConfig({\n  server: {\n    proxy: { '/api': 'http://localhost:8080' },\n    port: 3000,\n  },\n})",
    "export default defineConfig({\n  server: { allowedHosts: [\"a.test\"] },\n})",
    "export default defineConfig({\n  server: { port: Number(process.env.PORT) },\n})",
    "export default defineConfig({\n  plugins: [devtools(), viteReact()],\n})",
    "export default defineConfig({\n  plugins: [devtools({ consolePiping: true })],\n})",
    "export default defineConfig({\n  plugins: [devtools({ eventBusConfig: { port: 42000 } })],\n})",
    "// just a comment, no config object",
];

fn shape() -> impl Strategy<Value = &'static str> {
    prop::sample::select(SHAPES)
}

fn options() -> impl Strategy<Value = PatchOptions> {
    (
        prop::option::of("[a-z]{1,8}\\.[a-z]{2,6}"),
        prop::option::of(1024u16..=28535),
    )
        .prop_map(|(domain, port)| {
            let mut options = PatchOptions::new();
            if let Some(domain) = domain {
                options = options.dev_domain(domain);
            }
            if let Some(port) = port {
                options = options
                    .server_port(port)
                    .devtools_port(zdev::config::devtools_port_for(port).unwrap_or(port));
            }
            options
        })
}

proptest! {
    #[test]
    fn prop_second_patch_changes_nothing(source in shape(), options in options()) {
        let first = patch_source(source, &options);
        let second = patch_source(&first.content, &options);
        prop_assert_eq!(&second.content, &first.content);
    }

    #[test]
    fn prop_existing_lines_survive_in_order(source in shape(), options in options()) {
        let patched = patch_source(source, &options).content;

        // Tokens that hold no rewritable value are still there, in order
        let rewritable = |token: &str| {
            ["port", "devtools", "allowedHosts", "\""]
                .iter()
                .any(|marker| token.contains(marker))
                || token.starts_with(|c: char| c.is_ascii_digit())
        };
        let mut cursor = 0;
        for token in source.split_whitespace().filter(|t| !rewritable(t)) {
            let found = patched[cursor..].find(token);
            prop_assert!(found.is_some(), "missing {:?} in {:?}", token, patched);
            cursor += found.unwrap_or(0) + token.len();
        }
    }

    #[test]
    fn prop_allow_all_is_never_narrowed(domain in "[a-z]{1,8}\\.[a-z]{2,6}") {
        let source = "export default defineConfig({\n  server: { allowedHosts: true },\n})";
        let outcome = patch_source(source, &PatchOptions::new().dev_domain(domain));
        prop_assert_eq!(outcome.content, source);
    }
}
