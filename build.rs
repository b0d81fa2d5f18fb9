use std::fs;

fn main() {
    // The bundled config is embedded with include_str!, so reject a broken one at build time
    let config_path = "src/default_config.toml";
    println!("cargo:rerun-if-changed={config_path}");

    let content = fs::read_to_string(config_path).expect("default_config.toml is readable");
    let table = match content.parse::<toml::Table>() {
        Ok(table) => table,
        Err(e) => panic!("Invalid default_config.toml: {e}"),
    };
    for section in ["emoji", "render"] {
        if !table.contains_key(section) {
            panic!("default_config.toml is missing the [{section}] section");
        }
    }
}
