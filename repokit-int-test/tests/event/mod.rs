mod event_suspension_test;
