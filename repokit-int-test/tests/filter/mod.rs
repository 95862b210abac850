mod filter_suspension_test;
