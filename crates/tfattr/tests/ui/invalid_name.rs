#![allow(dead_code)]

#[derive(tfattr::FromValue)]
struct Server {
    #[tfattr(name = "Port")]
    port: u16,
}

fn main() {}
