mod partnerships;
