mod backend_parity_test;
