#![allow(dead_code)]

#[derive(tfattr::ToValue)]
struct Pair(u16, u16);

fn main() {}
