#![allow(dead_code)]

#[derive(tfattr::FromValue)]
enum Setting {
    On,
    Off,
}

fn main() {}
