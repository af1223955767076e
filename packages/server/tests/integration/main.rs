mod harness;

mod category;
