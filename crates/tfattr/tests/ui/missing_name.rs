#![allow(dead_code)]

#[derive(tfattr::FromValue)]
struct Server {
    #[tfattr(name = "name")]
    name: String,
    port: u16,
}

fn main() {}
