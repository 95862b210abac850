mod dynamic_finder_test;
mod paging_test;
mod repository_factory_test;
mod repository_test;
