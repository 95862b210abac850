mod backend;
mod event;
mod filter;
mod repository;

#[ctor::ctor]
fn init() {
    colog::init();
}
