#![allow(dead_code)]

#[derive(tfattr::FromValue)]
struct Server {
    #[tfattr(name = "port")]
    port: u16,
    #[tfattr(name = "port")]
    other_port: u16,
}

fn main() {}
